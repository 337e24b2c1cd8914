pub mod supervisor;

pub use supervisor::ScriptSupervisor;
