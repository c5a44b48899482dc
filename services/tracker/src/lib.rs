// Domain layer modules
pub mod domain;

// Application layer modules
pub mod application;

// Infrastructure layer modules
pub mod infrastructure;

// Lambda関数の起動時構築
pub mod bootstrap;
