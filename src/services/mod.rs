// Business logic between the HTTP routes and the OpenAI client

pub mod image;
pub mod script;
pub mod video;
