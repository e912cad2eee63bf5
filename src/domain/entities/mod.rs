pub mod comment;
pub mod entity_state;
pub mod pending_action;
pub mod post;
pub mod session;

pub use comment::{Comment, CommentNode, CommentThread};
pub use entity_state::EntityState;
pub use pending_action::PendingAction;
pub use post::{Post, PostPatch};
pub use session::SessionContext;
