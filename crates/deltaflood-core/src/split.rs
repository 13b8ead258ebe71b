use crate::types::{ChangeEvent, ChangeKind, Tuple};

/// The `_action` label attached to a rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    Insert,
    /// The before-image of an update.
    Replace,
    /// The after-image of an update.
    Update,
    Delete,
}

impl ImageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAction::Insert => "insert",
            ImageAction::Replace => "replace",
            ImageAction::Update => "update",
            ImageAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ImageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row image of an event, labelled with the action it renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image<'a> {
    pub action: ImageAction,
    pub tuple: &'a Tuple,
}

/// Split an event into the images to render, in emission order.
///
/// Updates yield the before-image as `replace` followed by the after-image
/// as `update`. Missing images are skipped, so the result may be empty.
pub fn split(event: &ChangeEvent) -> Vec<Image<'_>> {
    let mut images = Vec::with_capacity(2);

    match event.kind {
        ChangeKind::Insert => {
            if let Some(after) = &event.after {
                images.push(Image {
                    action: ImageAction::Insert,
                    tuple: after,
                });
            }
        }
        ChangeKind::Update => {
            if let Some(before) = &event.before {
                images.push(Image {
                    action: ImageAction::Replace,
                    tuple: before,
                });
            }
            if let Some(after) = &event.after {
                images.push(Image {
                    action: ImageAction::Update,
                    tuple: after,
                });
            }
        }
        ChangeKind::Delete => {
            if let Some(before) = &event.before {
                images.push(Image {
                    action: ImageAction::Delete,
                    tuple: before,
                });
            }
        }
    }

    images
}
