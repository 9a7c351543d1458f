//! Type descriptors: static schema for native mirror types and layouts
//! synthesized from script structures at load time.

use std::sync::Arc;

use crate::object::{Instance, ObjectKind};

/// Shared handle to an immutable descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// How a value of a property is stored in a defaults buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Byte,
    Int,
    Bool,
    Float,
    /// Object, class and component references: a raw package index.
    Object,
    /// Interface reference: a raw package index plus padding.
    Interface,
    Name,
    Str,
    Array,
    Map,
    Struct,
    Delegate,
    Pointer,
    /// Fork-specific native storage with no portable layout.
    Opaque,
}

impl ValueKind {
    /// Natural alignment of one element.
    pub fn alignment(self) -> usize {
        match self {
            ValueKind::Byte | ValueKind::Bool | ValueKind::Opaque => 1,
            ValueKind::Pointer => 8,
            // Struct alignment comes from its layout.
            ValueKind::Struct => 1,
            _ => 4,
        }
    }
}

/// Number of elements a property stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCount {
    /// Fixed-size inline array (1 for a scalar).
    Fixed(u32),
    /// Dynamically-sized container; the element size is given separately.
    Dynamic,
}

impl PropertyCount {
    /// Raw on-table value: the element count, or -1 for a container.
    pub fn raw(self) -> i32 {
        match self {
            PropertyCount::Fixed(n) => n as i32,
            PropertyCount::Dynamic => -1,
        }
    }
}

/// One entry of a descriptor's property table.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Declared element type; `None` marks a property that is ignored.
    pub type_name: Option<String>,
    pub offset: usize,
    pub count: PropertyCount,
    pub element_size: usize,
    pub value: ValueKind,
    /// Layout of a struct-valued property.
    pub layout: Option<TypeRef>,
    /// Element description of an array-valued property.
    pub inner: Option<Box<PropertyDescriptor>>,
}

impl PropertyDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: ValueKind,
        offset: usize,
        element_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            offset,
            count: PropertyCount::Fixed(1),
            element_size,
            value,
            layout: None,
            inner: None,
        }
    }

    /// A property that is recognized but never stored.
    pub fn dropped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            offset: 0,
            count: PropertyCount::Fixed(0),
            element_size: 0,
            value: ValueKind::Opaque,
            layout: None,
            inner: None,
        }
    }

    pub fn with_count(mut self, count: PropertyCount) -> Self {
        self.count = count;
        self
    }

    pub fn with_layout(mut self, layout: TypeRef) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_inner(mut self, inner: PropertyDescriptor) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    pub fn is_dropped(&self) -> bool {
        self.type_name.is_none()
    }

    /// Bytes occupied inline by all elements.
    pub fn inline_size(&self) -> usize {
        match self.count {
            PropertyCount::Fixed(n) => self.element_size * n as usize,
            PropertyCount::Dynamic => self.element_size,
        }
    }
}

/// Instance factory of a descriptor.
#[derive(Clone, Copy, Default)]
pub enum Constructor {
    #[default]
    None,
    /// Native variant of the object model.
    Native(fn() -> ObjectKind),
    /// Instance of a script type; data laid out by the descriptor itself.
    Instance,
}

impl Constructor {
    pub fn is_none(&self) -> bool {
        matches!(self, Constructor::None)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructor::None => f.write_str("None"),
            Constructor::Native(_) => f.write_str("Native"),
            Constructor::Instance => f.write_str("Instance"),
        }
    }
}

/// Immutable schema of one type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    is_class: bool,
    parent: Option<TypeRef>,
    instance_size: usize,
    alignment: usize,
    properties: Vec<PropertyDescriptor>,
    constructor: Constructor,
    binary: bool,
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    fn new(name: impl Into<String>, is_class: bool) -> Self {
        Self {
            name: name.into(),
            is_class,
            parent: None,
            instance_size: 0,
            alignment: 1,
            properties: Vec::new(),
            constructor: Constructor::None,
            binary: false,
        }
    }

    // === Builder ===

    pub fn with_parent(mut self, parent: Option<TypeRef>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_size(mut self, instance_size: usize, alignment: usize) -> Self {
        self.instance_size = instance_size;
        self.alignment = alignment.max(1);
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_properties(mut self, properties: Vec<PropertyDescriptor>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = constructor;
        self
    }

    /// Values of this type are stored as raw bytes inside tagged lists.
    pub fn with_binary_layout(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn into_ref(self) -> TypeRef {
        Arc::new(self)
    }

    // === Queries ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_class(&self) -> bool {
        self.is_class
    }

    pub fn parent(&self) -> Option<&TypeRef> {
        self.parent.as_ref()
    }

    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Instance size rounded up to the alignment.
    pub fn aligned_size(&self) -> usize {
        self.instance_size.next_multiple_of(self.alignment)
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn constructor(&self) -> Constructor {
        self.constructor
    }

    pub fn has_binary_layout(&self) -> bool {
        self.binary
    }

    /// This descriptor followed by its parent chain.
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// Name comparison along the parent chain, starting with this type.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.ancestors().any(|t| t.name == type_name)
    }

    /// Property declared by this type itself. Inherited properties are not
    /// searched; walk [`ancestors`](Self::ancestors) for that.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Allocate a default instance through the constructor.
    pub fn construct(self: &TypeRef) -> Option<ObjectKind> {
        match self.constructor {
            Constructor::None => None,
            Constructor::Native(make) => Some(make()),
            Constructor::Instance => Some(ObjectKind::Instance(Instance::new(self.clone()))),
        }
    }
}
