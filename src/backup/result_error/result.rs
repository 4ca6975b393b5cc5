use crate::backup::result_error::error::Error;
use crate::backup::result_error::{AddFunctionName, AddMsg};

pub type Result<T> = std::result::Result<T, Error>;

impl<R, S: Into<String>> AddMsg<S> for Result<R> {
    fn add_msg(self, msg: S) -> Self {
        self.map_err(|e| e.add_msg(msg))
    }
}

impl<R, S: Into<String>> AddFunctionName<S> for Result<R> {
    fn add_fn_name(self, fn_name: S) -> Self {
        self.map_err(|e| e.add_fn_name(fn_name))
    }
}
