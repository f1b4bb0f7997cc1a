pub mod application_service;
pub mod debounce;
pub mod listing_controller;
pub mod listing_service;
pub mod news_service;
pub mod preference_service;
pub mod share_service;
