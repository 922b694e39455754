pub mod time;

/// Generate a url-safe id used for process instances.
pub fn longid() -> String {
    nanoid::nanoid!(21)
}
