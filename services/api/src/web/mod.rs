pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary
// that builds the web server router.
pub use rest::{
    create_story_handler, delete_story_handler, generate_stories_handler, get_story_handler,
    list_stories_handler, search_stories_handler, story_stats_handler, update_story_handler,
};
