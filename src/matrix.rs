use core::ops::Index;

/// Slice of data with a stride, used to read a row of a column-major matrix.
pub struct StridedVecView<'a, A: 'a> {
    data: &'a [A],
    start: usize,
    stride: usize,
    len: usize,
}

impl<'a, A: 'a> StridedVecView<'a, A> {
    pub fn new(data: &'a [A], start: usize, stride: usize, len: usize) -> Self {
        Self {
            data,
            start,
            stride,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a A> {
        let (data, start, stride) = (self.data, self.start, self.stride);
        (0..self.len).map(move |pos| &data[start + pos * stride])
    }
}

impl<'a, A: 'a> Index<usize> for StridedVecView<'a, A> {
    type Output = A;
    fn index(&self, pos: usize) -> &A {
        assert!(pos < self.len);
        &self.data[self.start + pos * self.stride]
    }
}

/// Store a dense matrix in a column-major way.
///
/// The number of rows is stored explicitly, so a matrix without any column still knows how many
/// observations it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMajorMatrix<A> {
    /// Number of rows in the matrix
    n_rows: usize,
    /// Number of columns in the matrix
    n_cols: usize,
    /// Values, one column after the other
    values: Vec<A>,
}

impl<A> ColumnMajorMatrix<A> {
    pub fn from_columns(n_rows: usize, columns: Vec<Vec<A>>) -> Self {
        let n_cols = columns.len();
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for column in columns {
            assert_eq!(column.len(), n_rows, "columns must have the same length");
            values.extend(column);
        }
        Self {
            n_rows,
            n_cols,
            values,
        }
    }

    pub fn column(&self, col: usize) -> &[A] {
        let start = col * self.n_rows;
        &self.values[start..start + self.n_rows]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[A]> {
        let n_rows = self.n_rows;
        (0..self.n_cols).map(move |col| &self.values[col * n_rows..(col + 1) * n_rows])
    }

    pub fn row(&self, row: usize) -> StridedVecView<A> {
        assert!(row < self.n_rows);
        StridedVecView::new(&self.values, row, self.n_rows, self.n_cols)
    }

    pub fn flat(&self) -> &Vec<A> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
}

impl<A: Clone> ColumnMajorMatrix<A> {
    /// New matrix with the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns()
            .map(|column| rows.iter().map(|&i| column[i].clone()).collect())
            .collect();
        Self::from_columns(rows.len(), columns)
    }
}

impl<A> Index<(usize, usize)> for ColumnMajorMatrix<A> {
    type Output = A;
    fn index(&self, (row, col): (usize, usize)) -> &A {
        // No need to check for col because it will be out of the buffer
        assert!(row < self.n_rows);
        &self.values[row + col * self.n_rows]
    }
}
