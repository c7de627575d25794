pub mod post;
pub mod tags;

pub use post::Post;
pub use tags::Tags;
