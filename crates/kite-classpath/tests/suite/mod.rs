mod build;
mod hierarchy;
mod persisted;
