/// Turns free text into a value the remote system accepts as a tag value.
pub trait Sanitizer: Send + Sync {
    fn clean(&self, value: &str) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn clean(&self, value: &str) -> String {
        self(value)
    }
}
