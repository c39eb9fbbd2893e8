//! Memory type resolution

use ash::{vk, Device};

use super::error::{InitStage, VulkanError, VulkanResult};

/// First memory type allowed by `type_bits` whose flags include `required`
pub fn memory_type_from_properties(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = memory_properties
        .memory_type_count
        .min(vk::MAX_MEMORY_TYPES as u32);

    (0..count).find(|&i| {
        type_bits & (1 << i) != 0
            && memory_properties.memory_types[i as usize]
                .property_flags
                .contains(required)
    })
}

/// Like [`memory_type_from_properties`], escalating "not found" to a fatal
/// error for `stage`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
    stage: InitStage,
) -> VulkanResult<u32> {
    memory_type_from_properties(memory_properties, type_bits, required).ok_or(
        VulkanError::NoSuitableMemoryType {
            stage,
            type_bits,
            required,
        },
    )
}

/// Allocate one block satisfying `requirements` with the given properties
pub fn allocate(
    device: &Device,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    requirements: vk::MemoryRequirements,
    required: vk::MemoryPropertyFlags,
    stage: InitStage,
) -> VulkanResult<vk::DeviceMemory> {
    let memory_type_index =
        find_memory_type(memory_properties, requirements.memory_type_bits, required, stage)?;

    let alloc_info = vk::MemoryAllocateInfo::builder()
        .allocation_size(requirements.size)
        .memory_type_index(memory_type_index);

    unsafe { device.allocate_memory(&alloc_info, None) }
        .map_err(VulkanError::api(stage, "vkAllocateMemory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_table(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: types.len() as u32,
            ..Default::default()
        };
        for (slot, flags) in properties.memory_types.iter_mut().zip(types) {
            slot.property_flags = *flags;
        }
        properties
    }

    const LOCAL: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::DEVICE_LOCAL;
    const VISIBLE: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::HOST_VISIBLE;
    const COHERENT: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::HOST_COHERENT;

    #[test]
    fn test_first_matching_type_wins() {
        let table = memory_table(&[LOCAL, VISIBLE | COHERENT, VISIBLE | COHERENT | LOCAL]);

        assert_eq!(memory_type_from_properties(&table, 0b111, VISIBLE | COHERENT), Some(1));
        assert_eq!(memory_type_from_properties(&table, 0b111, LOCAL), Some(0));
    }

    #[test]
    fn test_type_bits_restrict_candidates() {
        let table = memory_table(&[LOCAL, VISIBLE | COHERENT, VISIBLE | COHERENT | LOCAL]);

        assert_eq!(memory_type_from_properties(&table, 0b100, VISIBLE | COHERENT), Some(2));
        assert_eq!(memory_type_from_properties(&table, 0b110, LOCAL), Some(2));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let table = memory_table(&[VISIBLE, LOCAL, LOCAL | VISIBLE]);
        let first = memory_type_from_properties(&table, 0b111, LOCAL);

        for _ in 0..8 {
            assert_eq!(memory_type_from_properties(&table, 0b111, LOCAL), first);
        }
    }

    #[test]
    fn test_zero_type_bits_finds_nothing() {
        let table = memory_table(&[LOCAL, VISIBLE | COHERENT]);
        assert_eq!(memory_type_from_properties(&table, 0, vk::MemoryPropertyFlags::empty()), None);
    }

    #[test]
    fn test_bits_beyond_type_count_are_ignored() {
        let table = memory_table(&[VISIBLE]);
        assert_eq!(memory_type_from_properties(&table, 0b10, vk::MemoryPropertyFlags::empty()), None);
    }

    #[test]
    fn test_missing_type_escalates_with_stage() {
        let table = memory_table(&[VISIBLE]);
        let err = find_memory_type(&table, 0b1, LOCAL, InitStage::DepthBuffer).unwrap_err();

        assert_eq!(err.stage(), InitStage::DepthBuffer);
        assert!(matches!(err, VulkanError::NoSuitableMemoryType { type_bits: 1, .. }));
    }
}
