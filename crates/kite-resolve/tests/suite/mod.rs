mod fixtures;
mod greeter;
mod members;
