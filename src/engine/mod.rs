pub mod dispatcher;
pub mod state_machine;
pub mod stats;
pub mod validator;
