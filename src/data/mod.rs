/// Data layer: core types, loading, and the session store.
///
/// Architecture:
/// ```text
///  ndvi_data.json / .csv / .parquet  (path or URL)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse → Dataset        (background thread)
///   └──────────┘
///        │  mpsc, consumed once
///        ▼
///   ┌──────────┐
///   │  store    │  Uninitialized → Loading → Ready | Failed
///   └──────────┘
///        │  get()
///        ▼
///     presenter (UI thread)
/// ```

pub mod loader;
pub mod model;
pub mod store;
