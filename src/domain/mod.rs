// Domain layer - Pure types and rules, no I/O
pub mod dashboard;
pub mod project;
pub mod views;
pub mod widget;
