use iced::widget::{container, image, scrollable, text};
use iced::{Element, Length};
use iced_aw::Wrap;
use std::path::PathBuf;

use arthropod_gallery::photo::thumbnail::THUMBNAIL_SIZE;

use crate::Message;

const SPACING: f32 = 10.0;

/// Thumbnails of one taxon in a wrapping grid, `columns` wide at most
pub fn gallery_grid(thumbnails: Option<&[PathBuf]>, columns: usize) -> Element<'_, Message> {
    let Some(thumbnails) = thumbnails else {
        return text("Loading photos...").size(16).into();
    };
    if thumbnails.is_empty() {
        return text("No photos for this taxon.").size(16).into();
    }

    let tiles: Vec<Element<'_, Message>> = thumbnails
        .iter()
        .map(|path| {
            image(image::Handle::from_path(path))
                .width(Length::Fixed(THUMBNAIL_SIZE as f32))
                .height(Length::Fixed(THUMBNAIL_SIZE as f32))
                .into()
        })
        .collect();

    let max_width = columns.max(1) as f32 * (THUMBNAIL_SIZE as f32 + SPACING);
    let grid = Wrap::with_elements(tiles)
        .spacing(SPACING)
        .line_spacing(SPACING);

    scrollable(container(grid).max_width(max_width))
        .height(Length::Fill)
        .into()
}
