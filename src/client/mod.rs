pub mod bridge;
pub mod channel;
pub mod controller;
pub mod feedback;
pub mod guard;
pub mod input;
pub mod line_channel;
pub mod messages;
pub mod table;
pub mod timer;

pub use controller::SessionController;
pub use table::SessionView;
