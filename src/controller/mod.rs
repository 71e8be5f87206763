mod game_controller;

pub use game_controller::GameController;
