//! Two-call enumeration
//!
//! Vulkan list queries are issued twice: once for the count, once for the
//! data. If the set grows between the calls the driver answers
//! `VK_INCOMPLETE` and the pair has to be re-issued.

use ash::vk;

/// Run a count/fetch query pair until the driver reports a stable result.
///
/// `query` receives the count slot and either a null pointer (count query)
/// or a buffer of `*count` elements (fetch). A zero count short-circuits to
/// an empty vector. Any result other than `SUCCESS` or `INCOMPLETE` is
/// returned as an error.
pub fn enumerate<T, F>(mut query: F) -> Result<Vec<T>, vk::Result>
where
    T: Default + Clone,
    F: FnMut(&mut u32, *mut T) -> vk::Result,
{
    loop {
        let mut count = 0u32;
        query(&mut count, std::ptr::null_mut()).result()?;

        if count == 0 {
            return Ok(Vec::new());
        }

        let mut items = vec![T::default(); count as usize];
        let result = query(&mut count, items.as_mut_ptr());

        match result {
            vk::Result::INCOMPLETE => {
                log::debug!("Enumeration result changed between count and fetch, retrying");
            }
            vk::Result::SUCCESS => {
                items.truncate(count as usize);
                return Ok(items);
            }
            err => return Err(err),
        }
    }
}
