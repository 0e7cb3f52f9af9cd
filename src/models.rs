pub mod admin;
pub mod auth;
pub mod catalog;
pub mod grievance;
pub mod messaging;
pub mod notification;
pub mod posm;
pub mod settings;
pub mod uid;
pub mod vendor;
pub mod warranty;
