use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Font, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};

use arthropod_gallery::config::LayoutConfig;
use arthropod_gallery::tree::{LayoutBox, TreeLayout};

use crate::Message;

/// Room left around the tree before the user pans
const MARGIN: f32 = 40.0;
/// Initial zoom, slightly zoomed out
const DEFAULT_ZOOM: f32 = 0.85;
const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 4.0;
/// A press that moves less than this is a click, not a drag
const CLICK_SLOP: f32 = 4.0;

const INTERACTIVE_FILL: Color = Color {
    r: 0.85,
    g: 0.18,
    b: 0.18,
    a: 1.0,
};
const PLAIN_FILL: Color = Color {
    r: 0.83,
    g: 0.83,
    b: 0.83,
    a: 1.0,
};

/// Canvas program drawing a computed taxonomy layout
pub struct TreeCanvas<'a> {
    pub layout: &'a TreeLayout,
    pub config: LayoutConfig,
}

/// Pan/zoom and drag tracking
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Screen offset of the layout origin
    pub offset: cgmath::Vector2<f32>,
    pub zoom: f32,
    pub pressed_at: Option<Point>,
    pub last_position: Option<Point>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            offset: cgmath::Vector2::new(MARGIN, MARGIN),
            zoom: DEFAULT_ZOOM,
            pressed_at: None,
            last_position: None,
        }
    }
}

impl ViewState {
    /// Map a point relative to the canvas bounds into layout coordinates
    fn to_layout(&self, position: Point) -> Point {
        Point::new(
            (position.x - self.offset.x) / self.zoom,
            (position.y - self.offset.y) / self.zoom,
        )
    }
}

impl TreeCanvas<'_> {
    /// Label of a box, inset by the padding it was measured with
    fn label_text(&self, b: &LayoutBox) -> canvas::Text {
        canvas::Text {
            content: b.label.clone(),
            position: Point::new(b.x + self.config.pad_x, b.y + self.config.pad_y),
            color: Color::BLACK,
            size: Pixels(self.config.font_size),
            // Boxes are sized for a fixed advance
            font: Font::MONOSPACE,
            ..canvas::Text::default()
        }
    }

    fn taxon_under(&self, state: &ViewState, position: Point) -> Option<i64> {
        let p = state.to_layout(position);
        self.layout.hit_test(p.x, p.y).map(|b| b.taxon_id)
    }
}

impl Program<Message> for TreeCanvas<'_> {
    type State = ViewState;

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let edge_color = theme.palette().text;

        frame.with_save(|frame| {
            frame.translate(Vector::new(state.offset.x, state.offset.y));
            frame.scale(state.zoom);

            // Edges first so boxes cover their ends
            for line in &self.layout.lines {
                let path = Path::line(Point::new(line.x1, line.y1), Point::new(line.x2, line.y2));
                frame.stroke(
                    &path,
                    Stroke::default().with_color(edge_color).with_width(1.0),
                );
            }

            for b in &self.layout.boxes {
                let top_left = Point::new(b.x, b.y);
                let size = Size::new(b.width, b.height);
                let fill = if b.is_interactive {
                    INTERACTIVE_FILL
                } else {
                    PLAIN_FILL
                };

                frame.fill_rectangle(top_left, size, fill);
                frame.stroke(
                    &Path::rectangle(top_left, size),
                    Stroke::default().with_color(Color::BLACK).with_width(1.0),
                );
                frame.fill_text(self.label_text(b));
            }
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel zooms around the layout origin
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.position_in(bounds).is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                let step = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y * 0.1,
                    mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                };
                state.zoom = (state.zoom * (1.0 + step)).clamp(MIN_ZOOM, MAX_ZOOM);
                return (canvas::event::Status::Captured, None);
            }

            // Mouse button press - start dragging or clicking
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.pressed_at = Some(pos);
                    state.last_position = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse move - pan if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let (Some(last), Some(current)) = (state.last_position, cursor.position_in(bounds)) {
                    state.offset += cgmath::Vector2::new(current.x - last.x, current.y - last.y);
                    state.last_position = Some(current);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - a short press on a photographed taxon opens it
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let pressed_at = state.pressed_at.take();
                state.last_position = None;

                if let (Some(start), Some(end)) = (pressed_at, cursor.position_in(bounds)) {
                    if start.distance(end) <= CLICK_SLOP {
                        let message = self.taxon_under(state, end).map(Message::OpenGallery);
                        return (canvas::event::Status::Captured, message);
                    }
                }
                return (canvas::event::Status::Captured, None);
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.last_position.is_some() {
            return mouse::Interaction::Grabbing;
        }
        match cursor.position_in(bounds) {
            Some(pos) if self.taxon_under(state, pos).is_some() => mouse::Interaction::Pointer,
            Some(_) => mouse::Interaction::Grab,
            None => mouse::Interaction::default(),
        }
    }
}
