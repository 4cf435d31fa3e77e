pub mod dispatcher;
pub mod events;
pub mod sink;

pub use dispatcher::Dispatcher;
pub use events::{LocationEvent, ParseErrorEvent, UnhandledMessage};
pub use sink::{EventSink, PrintMode, StdoutSink};
