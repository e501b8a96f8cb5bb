use std::{
    fmt::{Display, Formatter},
    ops::{Deref, DerefMut},
};

/// Line-oriented writer shared by the `.gr` and result-report `Display` impls.
pub(crate) struct LineWriter<'a, 'b>(&'a mut Formatter<'b>);

impl<'a, 'b> Deref for LineWriter<'a, 'b> {
    type Target = Formatter<'b>;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, 'b> DerefMut for LineWriter<'a, 'b> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl<'a, 'b> LineWriter<'a, 'b> {
    pub(crate) fn new(f: &'a mut Formatter<'b>) -> Self {
        Self(f)
    }

    pub(crate) fn line<T: Display>(&mut self, value: T) -> std::fmt::Result {
        writeln!(self, "{value}")
    }

    /// `c <text>`, or a bare `c` for an empty comment.
    pub(crate) fn comment(&mut self, text: &str) -> std::fmt::Result {
        if text.is_empty() {
            self.line("c")
        } else {
            writeln!(self, "c {text}")
        }
    }

    pub(crate) fn comments(&mut self, lines: &[String]) -> std::fmt::Result {
        for line in lines {
            self.comment(line)?;
        }
        Ok(())
    }

    pub(crate) fn kv_colon<T: Display>(&mut self, key: &str, value: T) -> std::fmt::Result {
        writeln!(self, "{key}: {value}")
    }

    /// `[a,b,c]`
    pub(crate) fn bracketed<T: Display>(&mut self, values: &[T]) -> std::fmt::Result {
        write!(self, "[")?;
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                write!(self, ",")?;
            }
            write!(self, "{value}")?;
        }
        self.line("]")
    }

    /// Space-separated values, each followed by the separator (`1 2 3 `).
    pub(crate) fn trailing_row<T: Display>(&mut self, values: &[T]) -> std::fmt::Result {
        for value in values {
            write!(self, "{value} ")?;
        }
        self.line("")
    }
}
