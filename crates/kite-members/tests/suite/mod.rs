mod flattening;
mod two_tier;
