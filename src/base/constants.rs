//! Domain constants shared across the toolchain.

/// File extension for Glot grammar files.
pub const GLOT_EXTENSION: &str = "glot";

/// File extension for structural metamodel files (XML interchange form).
pub const ECORE_EXTENSION: &str = "ecore";

/// File extension for generator-model files.
pub const GENMODEL_EXTENSION: &str = "genmodel";

/// File extension for textual metamodel files.
pub const XCORE_EXTENSION: &str = "xcore";

/// URI scheme for workspace-relative resource locators.
pub const PLATFORM_SCHEME: &str = "platform";

/// First segment of a `platform:` URI that addresses workspace content.
pub const RESOURCE_SEGMENT: &str = "resource";

/// Namespace URI of the built-in structural metamodel package.
pub const ECORE_NS_URI: &str = "http://www.eclipse.org/emf/2002/Ecore";

/// Namespace URI of the built-in textual metamodel library package.
pub const XCORE_LANG_NS_URI: &str = "http://glotta.dev/xcore/lang";

/// All file extensions that require a dedicated resource handler.
pub const SPECIAL_EXTENSIONS: &[&str] = &[ECORE_EXTENSION, GENMODEL_EXTENSION, XCORE_EXTENSION];
