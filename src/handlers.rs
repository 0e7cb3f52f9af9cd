// src/handlers.rs

pub mod admin;
pub mod assignment;
pub mod auth;
pub mod catalog;
pub mod grievance;
pub mod notification;
pub mod posm;
pub mod public;
pub mod settings;
pub mod uid;
pub mod upload;
pub mod vendor;
pub mod warranty;
pub mod ws;
