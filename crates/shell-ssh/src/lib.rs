mod ssh_service;

pub use ssh_service::SshCommandService;
