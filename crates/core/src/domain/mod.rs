pub mod record;
pub mod recommendation;
