mod local_service;

pub use local_service::LocalCommandService;
