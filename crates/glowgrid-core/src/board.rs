//! Widget collection and selection owned by the core.
//!
//! The editing UI talks to the board through four commands (add, update,
//! clear, select); the render pipeline reads the collection in insertion
//! order and the selection id once per frame.

use embedded_graphics::prelude::*;
use log::debug;
use thiserror::Error;

use crate::widget::{Widget, WidgetId};

/// Errors from board commands
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    /// A widget with this id is already on the board
    #[error("widget id {0} is already on the board")]
    DuplicateId(WidgetId),

    /// No widget with this id exists
    #[error("no widget with id {0}")]
    UnknownWidget(WidgetId),
}

/// Ordered widget collection plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct WidgetBoard {
    widgets: Vec<Widget>,
    selected: Option<WidgetId>,
}

impl WidgetBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from an initial layout, skipping duplicate ids.
    pub fn from_widgets(widgets: impl IntoIterator<Item = Widget>) -> Self {
        let mut board = Self::new();
        for widget in widgets {
            if let Err(e) = board.add_widget(widget) {
                log::warn!("Skipping widget from initial layout: {}", e);
            }
        }
        board
    }

    /// Append a widget to the end of the collection.
    pub fn add_widget(&mut self, widget: Widget) -> Result<(), BoardError> {
        if self.widget(&widget.id).is_some() {
            return Err(BoardError::DuplicateId(widget.id));
        }
        debug!(
            "Adding {} widget {} at ({}, {})",
            widget.kind(),
            widget.id,
            widget.x,
            widget.y
        );
        self.widgets.push(widget);
        Ok(())
    }

    /// Replace the widget with the same id, keeping its collection position.
    pub fn update_widget(&mut self, widget: Widget) -> Result<(), BoardError> {
        match self.widgets.iter_mut().find(|w| w.id == widget.id) {
            Some(slot) => {
                debug!("Updating {} widget {}", widget.kind(), widget.id);
                *slot = widget;
                Ok(())
            }
            None => Err(BoardError::UnknownWidget(widget.id)),
        }
    }

    /// Remove every widget and drop the selection.
    pub fn clear_all(&mut self) {
        debug!("Clearing {} widgets", self.widgets.len());
        self.widgets.clear();
        self.selected = None;
    }

    /// Set or clear the selected widget id.
    ///
    /// An id that names no widget is kept but draws no outline.
    pub fn select_widget(&mut self, id: Option<WidgetId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<&WidgetId> {
        self.selected.as_ref()
    }

    /// The selected widget, if the selection names one on the board.
    pub fn selected_widget(&self) -> Option<&Widget> {
        self.selected.as_ref().and_then(|id| self.widget(id))
    }

    pub fn widget(&self, id: &WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| &w.id == id)
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// First widget in collection order whose box contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.contains(point))
    }
}

/// Map a pointer position on a displayed (possibly scaled) surface to
/// surface pixel coordinates.
pub fn scale_to_surface(point: Point, displayed: Size, surface: Size) -> Point {
    if displayed.width == 0 || displayed.height == 0 {
        return point;
    }
    let x = point.x as f32 * surface.width as f32 / displayed.width as f32;
    let y = point.y as f32 * surface.height as f32 / displayed.height as f32;
    Point::new(x as i32, y as i32)
}
