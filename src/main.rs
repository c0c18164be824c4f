use iced::widget::{button, canvas, column, container, row, text, text_input, Column};
use iced::{Alignment, Color, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;

use arthropod_gallery::config::{self, AppConfig};
use arthropod_gallery::photo::thumbnail;
use arthropod_gallery::state::data::{Taxon, TaxonId};
use arthropod_gallery::state::photos::{PhotoLibrary, IMAGE_EXTENSIONS};
use arthropod_gallery::state::taxonomy::TaxonomyDb;
use arthropod_gallery::tree::measure::MonospaceMeasurer;
use arthropod_gallery::tree::view::build_tree_view;
use arthropod_gallery::tree::TreeLayout;

mod ui;

/// How many completions to show under the taxon field
const SUGGESTION_LIMIT: usize = 8;

const OK_COLOR: Color = Color {
    r: 0.2,
    g: 0.7,
    b: 0.3,
    a: 1.0,
};
const ERROR_COLOR: Color = Color {
    r: 0.9,
    g: 0.25,
    b: 0.25,
    a: 1.0,
};

/// Which page is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Tree,
    Gallery,
}

/// Photos of the taxon whose box was clicked
#[derive(Debug)]
struct GalleryView {
    taxon_id: TaxonId,
    title: String,
    /// None while thumbnails are being generated
    thumbnails: Option<Vec<PathBuf>>,
}

/// Main application state
struct ArthropodGallery {
    config: AppConfig,
    /// None until `import-taxonomy` has produced a database
    taxonomy: Option<TaxonomyDb>,
    /// The loaded photo collection
    library: Option<PhotoLibrary>,
    collections: Vec<String>,
    collection_input: String,
    taxon_input: String,
    suggestions: Vec<Taxon>,
    /// Status message to display to the user, with a success flag
    status: Option<(String, bool)>,
    screen: Screen,
    tree: Option<TreeLayout>,
    gallery: Option<GalleryView>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    CollectionInputChanged(String),
    LoadCollection,
    NewCollection,
    TaxonInputChanged(String),
    SuggestionPicked(String),
    AddPhoto,
    ViewTree,
    /// An interactive box in the tree was clicked
    OpenGallery(TaxonId),
    ThumbnailsReady(TaxonId, Vec<PathBuf>),
    BackToMenu,
    BackToTree,
}

impl ArthropodGallery {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let mut status = None;

        let first_run = !config::config_file(&config::data_dir()).exists();
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("config unreadable, falling back to defaults: {}", e);
            status = Some((format!("Config ignored: {}", e), false));
            AppConfig::default()
        });
        // Leave an editable file behind
        if first_run {
            if let Err(e) = config.save() {
                tracing::warn!("could not write default config: {}", e);
            }
        }

        let taxonomy = if config.taxonomy_db.is_file() {
            match TaxonomyDb::open(&config.taxonomy_db) {
                Ok(db) => Some(db),
                Err(e) => {
                    status = Some((format!("Cannot open taxonomy: {}", e), false));
                    None
                }
            }
        } else {
            status = Some((
                format!(
                    "No taxonomy at {}. Run import-taxonomy first.",
                    config.taxonomy_db.display()
                ),
                false,
            ));
            None
        };

        let collections = PhotoLibrary::list_collections(&config.collections_dir);
        tracing::info!("found {} photo collections", collections.len());

        (
            ArthropodGallery {
                config,
                taxonomy,
                library: None,
                collections,
                collection_input: String::new(),
                taxon_input: String::new(),
                suggestions: Vec::new(),
                status,
                screen: Screen::Menu,
                tree: None,
                gallery: None,
            },
            Task::none(),
        )
    }

    fn report(&mut self, message: impl Into<String>, ok: bool) {
        let message = message.into();
        if ok {
            tracing::info!("{}", message);
        } else {
            tracing::warn!("{}", message);
        }
        self.status = Some((message, ok));
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::CollectionInputChanged(value) => {
                self.collection_input = value;
            }
            Message::LoadCollection => {
                let name = std::mem::take(&mut self.collection_input);
                match PhotoLibrary::open(&self.config, name.trim()) {
                    Ok(library) => {
                        self.library = Some(library);
                        self.report("Collection loaded", true);
                    }
                    Err(e) => self.report(e.to_string(), false),
                }
            }
            Message::NewCollection => {
                let name = std::mem::take(&mut self.collection_input);
                match PhotoLibrary::create(&self.config, name.trim()) {
                    Ok(library) => {
                        self.library = Some(library);
                        self.collections = PhotoLibrary::list_collections(&self.config.collections_dir);
                        self.report("Collection created", true);
                    }
                    Err(e) => self.report(e.to_string(), false),
                }
            }
            Message::TaxonInputChanged(value) => {
                self.suggestions = match &self.taxonomy {
                    Some(db) => db.search_names(&value, SUGGESTION_LIMIT).unwrap_or_else(|e| {
                        tracing::warn!("name search failed: {}", e);
                        Vec::new()
                    }),
                    None => Vec::new(),
                };
                self.taxon_input = value;
            }
            Message::SuggestionPicked(name) => {
                self.taxon_input = name;
                self.suggestions.clear();
            }
            Message::AddPhoto => self.add_photo(),
            Message::ViewTree => self.view_tree(),
            Message::OpenGallery(taxon_id) => return self.open_gallery(taxon_id),
            Message::ThumbnailsReady(taxon_id, paths) => {
                if let Some(gallery) = self.gallery.as_mut().filter(|g| g.taxon_id == taxon_id) {
                    gallery.thumbnails = Some(paths);
                }
            }
            Message::BackToMenu => {
                self.screen = Screen::Menu;
                self.tree = None;
                self.gallery = None;
            }
            Message::BackToTree => {
                self.screen = Screen::Tree;
                self.gallery = None;
            }
        }

        Task::none()
    }

    /// Pick an image file and attach it to the taxon named in the input
    fn add_photo(&mut self) {
        if self.taxonomy.is_none() || self.library.is_none() {
            self.report("Load a collection first", false);
            return;
        }
        let (Some(taxonomy), Some(library)) = (&self.taxonomy, &self.library) else {
            return;
        };

        let name = self.taxon_input.trim().to_string();
        let taxon = match taxonomy.require_by_name(&name) {
            Ok(taxon) => taxon,
            Err(e) => {
                self.report(e.to_string(), false);
                return;
            }
        };

        // Show the native file picker dialog
        let Some(source) = FileDialog::new()
            .set_title("Select Image")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        let result = library.add_photo(taxon.id, &source);
        match result {
            Ok(_) => {
                self.taxon_input.clear();
                self.suggestions.clear();
                self.report(format!("Photo added to {}", taxon.name), true);
            }
            Err(e) => self.report(e.to_string(), false),
        }
    }

    /// Build the tree of every photographed taxon and switch to it
    fn view_tree(&mut self) {
        if self.taxonomy.is_none() || self.library.is_none() {
            self.report("Load a collection first", false);
            return;
        }
        let (Some(taxonomy), Some(library)) = (&self.taxonomy, &self.library) else {
            return;
        };

        let measurer = MonospaceMeasurer::from_config(&self.config.layout);
        match build_tree_view(taxonomy, library, &measurer, &self.config.layout) {
            Ok(layout) => {
                if !layout.failures.is_empty() {
                    self.report(
                        format!("{} taxa could not be drawn", layout.failures.len()),
                        false,
                    );
                }
                self.tree = Some(layout);
                self.screen = Screen::Tree;
            }
            Err(e) => self.report(format!("Cannot build tree: {}", e), false),
        }
    }

    fn open_gallery(&mut self, taxon_id: TaxonId) -> Task<Message> {
        let Some(library) = &self.library else {
            return Task::none();
        };

        let photos = match library.associations_for_taxon(taxon_id) {
            Ok(photos) => photos,
            Err(e) => {
                self.report(e.to_string(), false);
                return Task::none();
            }
        };

        let title = self
            .tree
            .as_ref()
            .and_then(|t| t.find(taxon_id))
            .map(|b| b.label.clone())
            .unwrap_or_else(|| taxon_id.to_string());
        let cache_dir = library.thumbnail_dir().to_path_buf();

        self.gallery = Some(GalleryView {
            taxon_id,
            title,
            thumbnails: None,
        });
        self.screen = Screen::Gallery;

        // Launch async thumbnail task
        Task::perform(thumbnail::load_thumbnails(photos, cache_dir), move |paths| {
            Message::ThumbnailsReady(taxon_id, paths)
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match self.screen {
            Screen::Menu => self.menu_view(),
            Screen::Tree => self.tree_view(),
            Screen::Gallery => self.gallery_view(),
        }
    }

    fn menu_view(&self) -> Element<Message> {
        let loaded = self.library.is_some() && self.taxonomy.is_some();

        let status: Element<Message> = match &self.status {
            Some((message, ok)) => text(message)
                .size(14)
                .color(if *ok { OK_COLOR } else { ERROR_COLOR })
                .into(),
            None => text("").size(14).into(),
        };

        let current = match &self.library {
            Some(library) => format!("Collection: {}", library.name()),
            None if self.collections.is_empty() => "No collections yet".to_string(),
            None => format!("Collections: {}", self.collections.join(", ")),
        };

        let mut suggestions = Column::new().spacing(2).width(250);
        for taxon in &self.suggestions {
            suggestions = suggestions.push(
                button(text(format!("{} ({})", taxon.name, taxon.rank)).size(12))
                    .on_press(Message::SuggestionPicked(taxon.name.clone()))
                    .width(Length::Fill)
                    .style(button::text),
            );
        }

        let content: Column<Message> = column![
            text("Arthropod Gallery").size(40).color(ERROR_COLOR),
            text(current).size(14),
            status,
            text_input("Enter collection name", &self.collection_input)
                .on_input(Message::CollectionInputChanged)
                .on_submit(Message::LoadCollection)
                .width(250),
            row![
                button("Load Collection").on_press(Message::LoadCollection),
                button("New Collection").on_press(Message::NewCollection),
            ]
            .spacing(8),
            button("View Tree").on_press_maybe(loaded.then_some(Message::ViewTree)),
            text_input("Enter taxon name", &self.taxon_input)
                .on_input_maybe(loaded.then_some(Message::TaxonInputChanged))
                .on_submit(Message::AddPhoto)
                .width(250),
            suggestions,
            button("Add Photo").on_press_maybe(loaded.then_some(Message::AddPhoto)),
        ]
        .spacing(12)
        .padding(40)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn tree_view(&self) -> Element<Message> {
        let header = row![
            button("Back").on_press(Message::BackToMenu),
            text("Click a red taxon to see its photos. Drag to pan, scroll to zoom.").size(14),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let body: Element<Message> = match &self.tree {
            Some(layout) if !layout.is_empty() => canvas(ui::tree_canvas::TreeCanvas {
                layout,
                config: self.config.layout,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            _ => container(text("No photos in this collection yet.").size(16))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        column![header, body].spacing(10).padding(10).into()
    }

    fn gallery_view(&self) -> Element<Message> {
        let Some(gallery) = &self.gallery else {
            return text("").into();
        };

        column![
            row![
                button("Back").on_press(Message::BackToTree),
                text(&gallery.title).size(24),
            ]
            .spacing(16)
            .align_y(Alignment::Center),
            ui::gallery::gallery_grid(gallery.thumbnails.as_deref(), self.config.gallery_columns),
        ]
        .spacing(10)
        .padding(10)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    arthropod_gallery::init_logging();

    iced::application(
        "Arthropod Gallery",
        ArthropodGallery::update,
        ArthropodGallery::view,
    )
    .theme(ArthropodGallery::theme)
    .centered()
    .run_with(ArthropodGallery::new)
}
