pub mod application_routes;
pub mod health;
pub mod image_routes;
