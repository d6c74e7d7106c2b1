pub mod event_loop;
pub mod help;
pub mod router;
