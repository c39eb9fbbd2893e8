//! Render pass management
//!
//! [`RenderPassDesc`] decides every attachment and dependency field without a
//! device; [`RenderPass`] only turns the description into a handle.

use ash::{vk, Device};

use super::error::{InitStage, VulkanError, VulkanResult};

/// Attachment, reference and dependency data for a single-subpass pass
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Color attachment at index 0, depth at index 1 when present
    pub attachments: Vec<vk::AttachmentDescription>,
    /// Reference to the color attachment
    pub color_ref: vk::AttachmentReference,
    /// Reference to the depth attachment
    pub depth_ref: Option<vk::AttachmentReference>,
    /// External-to-subpass dependency
    pub dependency: vk::SubpassDependency,
}

impl RenderPassDesc {
    /// Describe a pass with a color target and an optional depth target.
    ///
    /// # Panics
    /// If `clear` is false while `initial_layout` is `UNDEFINED`; loading
    /// the previous contents of an undefined image is meaningless.
    pub fn new(
        color_format: vk::Format,
        depth_format: Option<vk::Format>,
        clear: bool,
        initial_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
    ) -> Self {
        assert!(
            clear || initial_layout != vk::ImageLayout::UNDEFINED,
            "render pass must clear when the initial layout is undefined"
        );

        let mut attachments = vec![vk::AttachmentDescription::builder()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(if clear {
                vk::AttachmentLoadOp::CLEAR
            } else {
                vk::AttachmentLoadOp::LOAD
            })
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(initial_layout)
            .final_layout(final_layout)
            .build()];

        let depth_ref = depth_format.map(|format| {
            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(if clear {
                        vk::AttachmentLoadOp::CLEAR
                    } else {
                        vk::AttachmentLoadOp::DONT_CARE
                    })
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::STORE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .build(),
            );
            vk::AttachmentReference {
                attachment: 1,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            }
        });

        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };

        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .build();

        Self {
            attachments,
            color_ref,
            depth_ref,
            dependency,
        }
    }

    /// Forward pass presenting to the swapchain: UNDEFINED to PRESENT_SRC
    pub fn presentable(color_format: vk::Format, depth_format: Option<vk::Format>, clear: bool) -> Self {
        Self::new(
            color_format,
            depth_format,
            clear,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        )
    }
}

/// Render pass wrapper with RAII cleanup
pub struct RenderPass {
    device: Device,
    render_pass: vk::RenderPass,
}

impl RenderPass {
    /// Create the render pass described by `desc`
    pub fn new(device: Device, desc: &RenderPassDesc) -> VulkanResult<Self> {
        log::info!(
            "Creating render pass ({} attachments, depth: {})",
            desc.attachments.len(),
            desc.depth_ref.is_some()
        );

        let color_attachments = [desc.color_ref];
        let mut subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachments);
        if let Some(depth_ref) = desc.depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let subpasses = [subpass.build()];
        let dependencies = [desc.dependency];

        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&desc.attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.create_render_pass(&create_info, None) }
            .map_err(VulkanError::api(InitStage::RenderPass, "vkCreateRenderPass"))?;

        Ok(Self {
            device,
            render_pass,
        })
    }

    /// Get the render pass handle
    pub const fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOR: vk::Format = vk::Format::B8G8R8A8_UNORM;
    const DEPTH: vk::Format = vk::Format::D16_UNORM;

    #[test]
    fn test_clearing_pass_with_depth() {
        let desc = RenderPassDesc::presentable(COLOR, Some(DEPTH), true);
        assert_eq!(desc.attachments.len(), 2);

        let color = &desc.attachments[0];
        assert_eq!(color.format, COLOR);
        assert_eq!(color.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(color.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(color.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(color.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);

        let depth = &desc.attachments[1];
        assert_eq!(depth.format, DEPTH);
        assert_eq!(depth.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(depth.stencil_store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(depth.final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        assert_eq!(desc.depth_ref.map(|r| r.attachment), Some(1));
        assert_eq!(desc.color_ref.layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn test_color_only_pass() {
        let desc = RenderPassDesc::presentable(COLOR, None, true);
        assert_eq!(desc.attachments.len(), 1);
        assert!(desc.depth_ref.is_none());
    }

    #[test]
    fn test_loading_pass_keeps_contents() {
        let desc = RenderPassDesc::new(
            COLOR,
            Some(DEPTH),
            false,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );

        assert_eq!(desc.attachments[0].load_op, vk::AttachmentLoadOp::LOAD);
        assert_eq!(desc.attachments[1].load_op, vk::AttachmentLoadOp::DONT_CARE);
    }

    #[test]
    fn test_external_dependency() {
        let dep = RenderPassDesc::presentable(COLOR, None, true).dependency;

        assert_eq!(dep.src_subpass, vk::SUBPASS_EXTERNAL);
        assert_eq!(dep.dst_subpass, 0);
        assert_eq!(dep.src_stage_mask, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(dep.dst_stage_mask, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(dep.src_access_mask, vk::AccessFlags::empty());
        assert_eq!(dep.dst_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    }

    #[test]
    #[should_panic(expected = "must clear")]
    fn test_load_from_undefined_layout_panics() {
        let _ = RenderPassDesc::presentable(COLOR, None, false);
    }
}
