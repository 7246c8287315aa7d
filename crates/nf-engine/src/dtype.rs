use std::fmt;

/// Broad family of a tensor's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// IEEE 754 floating point.
    Float,
    /// Opaque handle; the engine never interprets the bytes.
    Handle,
}

impl TypeClass {
    /// Converts an NFM type-class ID to a `TypeClass`.
    ///
    /// NFM type-class IDs:
    /// - 0 => Int
    /// - 1 => UInt
    /// - 2 => Float
    /// - 3 => Handle
    pub fn from_nfm(id: u32) -> Option<TypeClass> {
        match id {
            0 => Some(TypeClass::Int),
            1 => Some(TypeClass::UInt),
            2 => Some(TypeClass::Float),
            3 => Some(TypeClass::Handle),
            _ => None,
        }
    }

    /// Returns the NFM type-class ID for this class.
    pub fn to_nfm(&self) -> u32 {
        match self {
            TypeClass::Int => 0,
            TypeClass::UInt => 1,
            TypeClass::Float => 2,
            TypeClass::Handle => 3,
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::Int => write!(f, "int"),
            TypeClass::UInt => write!(f, "uint"),
            TypeClass::Float => write!(f, "float"),
            TypeClass::Handle => write!(f, "handle"),
        }
    }
}

/// Element type of an engine tensor: a type class plus a bit width.
///
/// Any combination can appear in a model file; only some of them can be
/// computed on by the CPU ops, and consumers decide which ones they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementType {
    pub class: TypeClass,
    pub bits: u8,
}

impl ElementType {
    pub const I8: ElementType = ElementType::new(TypeClass::Int, 8);
    pub const I16: ElementType = ElementType::new(TypeClass::Int, 16);
    pub const I32: ElementType = ElementType::new(TypeClass::Int, 32);
    pub const I64: ElementType = ElementType::new(TypeClass::Int, 64);
    pub const U8: ElementType = ElementType::new(TypeClass::UInt, 8);
    pub const U16: ElementType = ElementType::new(TypeClass::UInt, 16);
    pub const U32: ElementType = ElementType::new(TypeClass::UInt, 32);
    pub const U64: ElementType = ElementType::new(TypeClass::UInt, 64);
    pub const F16: ElementType = ElementType::new(TypeClass::Float, 16);
    pub const F32: ElementType = ElementType::new(TypeClass::Float, 32);
    pub const F64: ElementType = ElementType::new(TypeClass::Float, 64);

    pub const fn new(class: TypeClass, bits: u8) -> Self {
        ElementType { class, bits }
    }

    /// Bytes occupied by one element, rounding partial bytes up.
    pub fn byte_width(&self) -> usize {
        (self.bits as usize).div_ceil(8)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.bits)
    }
}
