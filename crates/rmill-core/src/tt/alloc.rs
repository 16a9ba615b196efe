use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::cmp::max;
use std::ptr::NonNull;

use super::TtError;

/// 置換表用のゼロ初期化済み領域
pub(super) struct Allocation {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Allocation {
    /// `size` バイトを `alignment` 以上の境界で確保する
    ///
    /// Linux では 2MiB 境界に揃えて Transparent Huge Pages を要求する。
    pub(super) fn allocate(size: usize, alignment: usize) -> Result<Self, TtError> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        let page_align = 2 * 1024 * 1024;
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        let page_align = 4096;

        let alignment = max(alignment, page_align);
        let layout = Layout::from_size_align(size.max(1), alignment)
            .map_err(|_| TtError::Alloc { bytes: size })?
            .pad_to_align();

        // SAFETY: layout のサイズは1以上
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(TtError::Alloc { bytes: size })?;

        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            // SAFETY: ptr は layout.size() バイトの確保済み領域
            let result =
                unsafe { libc::madvise(ptr.as_ptr() as *mut _, layout.size(), libc::MADV_HUGEPAGE) };
            if result != 0 {
                log::debug!("madvise(MADV_HUGEPAGE) failed for {} bytes", layout.size());
            }
        }

        Ok(Self { ptr, layout })
    }

    pub(super) fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        // SAFETY: allocate と同じ layout で確保した領域
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

// SAFETY: 領域の中身は原子的な語のみで、アクセスは TranspositionTable 経由に限られる
unsafe impl Send for Allocation {}
unsafe impl Sync for Allocation {}
