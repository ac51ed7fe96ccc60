mod background;
mod events;
mod fixtures;
mod lifecycle;
