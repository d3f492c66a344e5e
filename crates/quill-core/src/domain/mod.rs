//! Domain entities - the core business objects.

pub mod comment;
pub mod image;
pub mod like;
pub mod page;
pub mod post;
pub mod subscriber;

pub use comment::{Comment, CommentNode, CommentStatus, NewComment, build_tree};
pub use image::{ImageUpload, UploadedImage};
pub use like::{LikeState, LikeUpdate};
pub use page::{Page, PageRequest};
pub use post::{Post, PostInput, PostStats, slugify};
pub use subscriber::{Subscriber, SubscriptionState};
