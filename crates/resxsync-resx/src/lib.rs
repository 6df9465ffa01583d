//! ResX resource documents: an English source and a target language file,
//! loaded fully into memory, queried by key or by value, written back on save.

mod document;
mod store;
mod util;

pub use document::{ResourceDocument, ResourceEntry};
pub use resxsync_core::{ResxError, Result};
pub use store::{Doc, ResourceStore};
pub use util::{ensure_extension, write_atomic};

#[cfg(test)]
pub(crate) mod fixtures {
    /// Mirrors the layout Visual Studio produces: schema-ish header, resheaders, data.
    pub const ENGLISH: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <!-- Generated resources -->
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <resheader name="version">
    <value>2.0</value>
  </resheader>
  <data name="Single" xml:space="preserve">
    <value>Only a single value should be found.</value>
  </data>
  <data name="MultiA" xml:space="preserve">
    <value>Multiple Keys Matching.</value>
  </data>
  <data name="MultiB" xml:space="preserve">
    <value>  multiple keys matching.  </value>
    <comment>padded on purpose</comment>
  </data>
  <data name="MultiC" xml:space="preserve">
    <value>MULTIPLE KEYS MATCHING.</value>
  </data>
  <data name="Greeting" xml:space="preserve">
    <value>Hello {0} &amp; welcome</value>
  </data>
  <data name="Logo" type="System.Drawing.Bitmap, System.Drawing" mimetype="application/x-microsoft.net.object.bytearray.base64">
    <value>iVBORw0KGgo=</value>
  </data>
</root>
"#;

    pub const TARGET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Hola {0}</value>
  </data>
</root>
"#;
}
