// labforge-core/src/infrastructure/display/html.rs

// Renders the "See <name> (<id>)" fragment shown after each provisioning step.

use minijinja::{Environment, context};

use crate::application::ports::LinkRenderer;
use crate::domain::resource::ResourceRef;
use crate::error::LabforgeError;
use crate::infrastructure::error::InfrastructureError;

const LINK_TEMPLATE: &str = r#"<html style="margin:0"><body style="margin:0"><div style="margin:0">
    See <a href="{{ route|safe }}/{{ id }}" target="_blank">{{ name }} ({{ id }})</a>
</div></body></html>"#;

pub struct HtmlLinkRenderer<'a> {
    env: Environment<'a>,
}

impl<'a> HtmlLinkRenderer<'a> {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn render(&self, reference: &ResourceRef) -> Result<String, InfrastructureError> {
        // The .html name turns on auto-escaping for name and id
        let html = self.env.render_named_str(
            "resource_link.html",
            LINK_TEMPLATE,
            context! {
                route => reference.kind.view_route(),
                id => &reference.id,
                name => &reference.name,
            },
        )?;
        Ok(html)
    }
}

impl<'a> Default for HtmlLinkRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> LinkRenderer for HtmlLinkRenderer<'a> {
    fn render_link(&self, reference: &ResourceRef) -> Result<String, LabforgeError> {
        Ok(self.render(reference)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::resource::ResourceKind;

    #[test]
    fn test_pool_link() -> anyhow::Result<()> {
        let renderer = HtmlLinkRenderer::new();
        let html = renderer.render(&ResourceRef::new(
            ResourceKind::InstancePool,
            "DBAcademy",
            "0101-pool-abc",
        ))?;
        assert!(html.contains(r#"href="/#setting/clusters/instance-pools/view/0101-pool-abc""#));
        assert!(html.contains("DBAcademy (0101-pool-abc)"));
        Ok(())
    }

    #[test]
    fn test_policy_link() -> anyhow::Result<()> {
        let renderer = HtmlLinkRenderer::new();
        let html = renderer.render(&ResourceRef::new(
            ResourceKind::ClusterPolicy,
            "DBAcademy Jobs",
            "E0631F5C0D000",
        ))?;
        assert!(html.contains("/#setting/clusters/cluster-policies/view/E0631F5C0D000"));
        assert!(html.contains("DBAcademy Jobs (E0631F5C0D000)"));
        Ok(())
    }

    #[test]
    fn test_name_is_escaped() -> anyhow::Result<()> {
        let renderer = HtmlLinkRenderer::new();
        let html = renderer.render(&ResourceRef::new(
            ResourceKind::ClusterPolicy,
            "<b>pwn</b>",
            "p1",
        ))?;
        assert!(!html.contains("<b>pwn</b>"));
        assert!(html.contains("&lt;b&gt;"));
        Ok(())
    }
}
