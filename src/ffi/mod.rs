// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! C ABI.
//!
//! Every function returns an `FtStatus`; on failure the message is
//! available from `ft_last_error` on the calling thread. Strings are
//! NUL-terminated UTF-8. All output buffers are owned by the caller.

mod error;
mod marshal;
mod models;
mod query;
mod registry;

pub use error::{ft_clear_last_error, ft_last_error, FtStatus};
pub use marshal::{
    copy_floats, copy_text, BufferMarshaller, MarshalError, MarshalReport, StringSlots,
};
pub use models::{
    ft_list_models_json, ft_load_model, ft_load_model_verified, ft_model_count, ft_remove_model,
};
pub use query::{
    ft_get_dimension, ft_get_label_count, ft_get_nearest_neighbors, ft_get_vector,
    ft_get_vocabulary_size, ft_list_vocabulary, ft_predict, ft_predict_max_intention,
};
pub use registry::{
    ft_init_logging, ft_registry_create, ft_registry_create_with_config, ft_registry_destroy,
    ft_registry_init_logging, FtRegistry,
};
