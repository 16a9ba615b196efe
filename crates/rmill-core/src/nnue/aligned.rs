//! 64バイトアラインのバッファ

use std::alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use super::constants::CACHE_LINE_SIZE;

/// アライメントを保証するラッパー（64バイト = キャッシュライン）
#[repr(C, align(64))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aligned<T>(pub T);

impl<T: Default> Default for Aligned<T> {
    fn default() -> Self {
        Self(T::default())
    }
}

/// 全ビット0が有効な値である整数型
///
/// # Safety
/// 実装する型はゼロ初期化されたメモリをそのまま値として読めること
pub unsafe trait Zeroable: Copy {}

unsafe impl Zeroable for i8 {}
unsafe impl Zeroable for u8 {}
unsafe impl Zeroable for i16 {}
unsafe impl Zeroable for i32 {}

/// 64バイトアラインのヒープ配列（重み用）
pub struct AlignedBox<T: Zeroable> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T: Zeroable> AlignedBox<T> {
    fn layout(len: usize) -> Layout {
        let size = (len * std::mem::size_of::<T>()).max(1);
        match Layout::from_size_align(size, CACHE_LINE_SIZE) {
            Ok(layout) => layout.pad_to_align(),
            Err(_) => handle_alloc_error(Layout::new::<T>()),
        }
    }

    /// ゼロ初期化して確保
    pub fn new_zeroed(len: usize) -> Self {
        let layout = Self::layout(len);
        // SAFETY: layout のサイズは1以上
        let raw = unsafe { alloc_zeroed(layout) } as *mut T;
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self { ptr, len }
    }
}

impl<T: Zeroable> Deref for AlignedBox<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr は len 要素分のゼロ初期化済み領域を指す
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> DerefMut for AlignedBox<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: 同上。&mut self なので排他
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> Drop for AlignedBox<T> {
    fn drop(&mut self) {
        // SAFETY: new_zeroed と同じ layout で確保した領域
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.len)) }
    }
}

impl<T: Zeroable> Clone for AlignedBox<T> {
    fn clone(&self) -> Self {
        let mut other = Self::new_zeroed(self.len);
        other.copy_from_slice(self);
        other
    }
}

// SAFETY: AlignedBox は領域を単独所有する
unsafe impl<T: Zeroable + Send> Send for AlignedBox<T> {}
unsafe impl<T: Zeroable + Sync> Sync for AlignedBox<T> {}
