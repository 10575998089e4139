use crate::domain::resource::ResourceRef;
use crate::error::LabforgeError;

pub trait LinkRenderer: Send + Sync {
    fn render_link(&self, reference: &ResourceRef) -> Result<String, LabforgeError>;
}
