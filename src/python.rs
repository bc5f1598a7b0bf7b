use std::cmp::Ordering;
use std::collections::HashMap;

use pyo3::exceptions::{PyAttributeError, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyList, PyString};

use crate::{LineInput, LineStore, PolicyFlag, StoreError, StoreOptions};

fn to_py_err(e: StoreError) -> PyErr {
    if e.is_io() {
        return PyOSError::new_err(e.to_string());
    }
    match e {
        StoreError::InvalidPolicyState { .. } => PyAttributeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// `False`, a `str`, or a `list` of `str`. Anything else is rejected before the
/// store is touched.
fn extract_input(obj: &Bound<'_, PyAny>) -> Result<LineInput, StoreError> {
    if let Ok(b) = obj.downcast::<PyBool>() {
        if !b.is_true() {
            return Ok(LineInput::Skip);
        }
    } else if obj.downcast::<PyString>().is_ok() {
        let s: String = obj
            .extract()
            .map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
        return Ok(LineInput::Line(s));
    } else if let Ok(list) = obj.downcast::<PyList>() {
        let mut lines = Vec::with_capacity(list.len());
        for item in list.iter() {
            let line: String = item
                .extract()
                .map_err(|_| StoreError::InvalidArgument(format!("{item} is not a string")))?;
            lines.push(line);
        }
        return Ok(LineInput::Lines(lines));
    }
    Err(StoreError::InvalidArgument(format!(
        "expected a string or list of strings, got {}",
        obj.get_type()
    )))
}

#[pyclass]
struct LineIter {
    inner: std::vec::IntoIter<String>,
}

#[pymethods]
impl LineIter {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(mut slf: PyRefMut<'_, Self>) -> Option<String> {
        slf.inner.next()
    }
}

#[pyclass(name = "LineStore")]
struct PyLineStore {
    inner: LineStore,
}

#[pymethods]
impl PyLineStore {
    #[new]
    #[pyo3(signature = (filename=None, logging=true))]
    fn new(filename: Option<String>, logging: bool) -> PyResult<Self> {
        let mut opts = StoreOptions::default().logging(logging);
        if let Some(f) = filename {
            opts = opts.path(f);
        }
        LineStore::with_options(opts)
            .map(|inner| Self { inner })
            .map_err(to_py_err)
    }

    fn read(&mut self, filename: &str) -> PyResult<bool> {
        self.inner.load(filename).map_err(to_py_err)?;
        Ok(true)
    }

    fn check(&self, line: &str) -> Option<String> {
        self.inner.contains(line).map(str::to_string)
    }

    fn add(&mut self, this: &Bound<'_, PyAny>) -> PyResult<bool> {
        let input = extract_input(this).map_err(to_py_err)?;
        self.inner.add(input).map_err(to_py_err)
    }

    fn append(&mut self, this: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.add(this)
    }

    fn rm(&mut self, this: &Bound<'_, PyAny>) -> PyResult<bool> {
        let input = extract_input(this).map_err(to_py_err)?;
        Ok(self.inner.remove(input))
    }

    fn replace(&mut self, old: &Bound<'_, PyAny>, new: &str) -> PyResult<bool> {
        let input = extract_input(old).map_err(to_py_err)?;
        Ok(self.inner.replace(input, new))
    }

    fn grep(&self, needle: &str) -> Vec<String> {
        self.inner
            .search(needle)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn egrep(&self, pattern: &str) -> PyResult<Vec<String>> {
        let hits = self.inner.search_regex(pattern).map_err(to_py_err)?;
        Ok(hits.into_iter().map(str::to_string).collect())
    }

    fn write(&mut self) -> PyResult<bool> {
        self.inner.persist().map_err(to_py_err)?;
        Ok(true)
    }

    fn save(&mut self) -> PyResult<bool> {
        self.write()
    }

    /// Sort in place. `key` is called once per distinct line and the results are
    /// compared with Python's `<`.
    #[pyo3(signature = (key=None, reverse=false))]
    fn sort(&mut self, key: Option<&Bound<'_, PyAny>>, reverse: bool) -> PyResult<()> {
        let Some(key) = key else {
            self.inner.sort_now(reverse);
            return Ok(());
        };
        let mut keys = HashMap::new();
        for line in self.inner.lines() {
            if !keys.contains_key(line) {
                keys.insert(line.clone(), key.call1((line.as_str(),))?);
            }
        }
        let mut failure: Option<PyErr> = None;
        self.inner.sort_by(
            |a, b| {
                let (ka, kb) = (&keys[a], &keys[b]);
                let order = ka.lt(kb).and_then(|less| {
                    if less {
                        Ok(Ordering::Less)
                    } else {
                        kb.lt(ka).map(|greater| {
                            if greater {
                                Ordering::Greater
                            } else {
                                Ordering::Equal
                            }
                        })
                    }
                });
                order.unwrap_or_else(|e| {
                    failure.get_or_insert(e);
                    Ordering::Equal
                })
            },
            reverse,
        );
        failure.map_or(Ok(()), Err)
    }

    /// `None` while the flag holds something other than a bool.
    #[getter]
    fn unique(&self) -> Option<bool> {
        self.inner.unique().resolve("unique").ok()
    }

    #[setter]
    fn set_unique(&mut self, value: &Bound<'_, PyAny>) {
        let flag = match value.downcast::<PyBool>() {
            Ok(b) => PolicyFlag::from(b.is_true()),
            Err(_) => PolicyFlag::Invalid(
                value.repr().map(|r| r.to_string()).unwrap_or_default(),
            ),
        };
        self.inner.set_unique(flag);
    }

    #[getter]
    fn sorted(&self) -> bool {
        self.inner.is_sorted_policy()
    }

    #[setter]
    fn set_sorted(&mut self, value: bool) {
        self.inner.set_sorted(value);
    }

    #[getter]
    fn changed(&self) -> bool {
        self.inner.is_dirty()
    }

    #[getter]
    fn linesep(&self) -> String {
        self.inner.line_separator().to_string()
    }

    #[setter]
    fn set_linesep(&mut self, value: String) {
        self.inner.set_line_separator(value);
    }

    #[getter]
    fn filename(&self) -> Option<String> {
        self.inner.source_path().map(str::to_string)
    }

    #[setter]
    fn set_filename(&mut self, value: String) {
        self.inner.set_source_path(value);
    }

    #[getter]
    fn contents(&self) -> Vec<String> {
        self.inner.lines().to_vec()
    }

    #[getter]
    fn birthday(&self) -> i64 {
        self.inner.created_at().timestamp()
    }

    #[getter]
    fn log(&self) -> String {
        self.inner.render_log().to_string()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __add__(&mut self, this: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.add(this)
    }

    fn __sub__(&mut self, this: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.rm(this)
    }

    fn __contains__(&self, line: &str) -> bool {
        self.inner.contains(line).is_some()
    }

    fn __iter__(&self) -> LineIter {
        LineIter {
            inner: self.inner.lines().to_vec().into_iter(),
        }
    }
}

#[pymodule]
fn linestore(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLineStore>()?;
    m.add_class::<LineIter>()?;
    Ok(())
}
