//! Containers usable as read and write buffers.
//!
//! The dataset accessor is generic over [`Buffer`], so any container with a row-major element slice
//! and a shape can be read into or written from.

use crate::{H5Error, NativeElement, Shape};

/// A container of `RANK`-dimensional data in row-major order.
pub trait Buffer<const RANK: usize> {
    /// The element type.
    type Element: NativeElement;

    /// Returns the shape of the contained data.
    fn shape(&self) -> Shape<RANK>;

    /// Resize the container to `shape`.
    ///
    /// Element values after a reshape are unspecified.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if the container cannot take `shape`.
    fn reshape(&mut self, shape: &Shape<RANK>) -> Result<(), H5Error>;

    /// Returns the elements.
    fn data(&self) -> &[Self::Element];

    /// Returns the elements for writing.
    fn data_mut(&mut self) -> &mut [Self::Element];
}

impl<T: NativeElement> Buffer<1> for Vec<T> {
    type Element = T;

    fn shape(&self) -> Shape<1> {
        Shape::new([self.len()])
    }

    fn reshape(&mut self, shape: &Shape<1>) -> Result<(), H5Error> {
        self.resize(shape[0], T::default());
        Ok(())
    }

    fn data(&self) -> &[T] {
        self
    }

    fn data_mut(&mut self) -> &mut [T] {
        self
    }
}

/// Rows of `N` elements.
impl<T: NativeElement, const N: usize> Buffer<2> for Vec<[T; N]> {
    type Element = T;

    fn shape(&self) -> Shape<2> {
        Shape::new([self.len(), N])
    }

    fn reshape(&mut self, shape: &Shape<2>) -> Result<(), H5Error> {
        if shape[1] != N {
            return Err(H5Error::ShapeMismatch {
                expected: vec![shape[0], N],
                actual: shape.dims().to_vec(),
            });
        }
        self.resize(shape[0], std::array::from_fn(|_| T::default()));
        Ok(())
    }

    fn data(&self) -> &[T] {
        self.as_flattened()
    }

    fn data_mut(&mut self) -> &mut [T] {
        self.as_flattened_mut()
    }
}

// Arrays not in standard layout present no elements, so reads and writes through them fail with a
// shape mismatch.
#[cfg(feature = "ndarray")]
macro_rules! ndarray_buffer {
    ($rank:literal, $dim:ty) => {
        impl<T: NativeElement> Buffer<$rank> for ndarray::Array<T, $dim> {
            type Element = T;

            fn shape(&self) -> Shape<$rank> {
                let mut dims = [0; $rank];
                dims.copy_from_slice(ndarray::ArrayBase::shape(self));
                Shape::new(dims)
            }

            fn reshape(&mut self, shape: &Shape<$rank>) -> Result<(), H5Error> {
                *self = ndarray::Array::from_elem(*shape.dims(), T::default());
                Ok(())
            }

            fn data(&self) -> &[T] {
                self.as_slice().unwrap_or_default()
            }

            fn data_mut(&mut self) -> &mut [T] {
                self.as_slice_mut().unwrap_or_default()
            }
        }
    };
}

#[cfg(feature = "ndarray")]
ndarray_buffer!(1, ndarray::Ix1);
#[cfg(feature = "ndarray")]
ndarray_buffer!(2, ndarray::Ix2);
#[cfg(feature = "ndarray")]
ndarray_buffer!(3, ndarray::Ix3);
#[cfg(feature = "ndarray")]
ndarray_buffer!(4, ndarray::Ix4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_vec() {
        let mut buffer: Vec<f32> = vec![1.0, 2.0];
        assert_eq!(buffer.shape(), Shape::new([2]));
        buffer.reshape(&Shape::new([4])).unwrap();
        assert_eq!(buffer.data(), &[1.0, 2.0, 0.0, 0.0]);
        buffer.data_mut()[3] = 5.0;
        assert_eq!(buffer, vec![1.0, 2.0, 0.0, 5.0]);
    }

    #[test]
    fn buffer_vec_rows() {
        let mut buffer: Vec<[f64; 3]> = vec![[1.0, 2.0, 3.0]];
        assert_eq!(Buffer::shape(&buffer), Shape::new([1, 3]));
        buffer.reshape(&Shape::new([2, 3])).unwrap();
        assert_eq!(buffer.data(), &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            buffer.reshape(&Shape::new([2, 4])),
            Err(H5Error::ShapeMismatch { .. })
        ));
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn buffer_ndarray() {
        let mut array = ndarray::Array2::<i32>::zeros((2, 3));
        assert_eq!(Buffer::shape(&array), Shape::new([2, 3]));
        Buffer::reshape(&mut array, &Shape::new([4, 5])).unwrap();
        assert_eq!(array.dim(), (4, 5));
        assert_eq!(Buffer::data(&array).len(), 20);

        let transposed = ndarray::Array2::<i32>::zeros((2, 3)).reversed_axes();
        assert!(Buffer::data(&transposed).is_empty());
    }
}
