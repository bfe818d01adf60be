/// Terminal presentation: palette, renderer, keyboard.

pub mod input;
pub mod palette;
pub mod renderer;
