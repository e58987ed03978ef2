//! Read the `Module` attribute of a compiled `module-info.class`.
//!
//! Only what the resolver needs is decoded: the module name and version, the
//! requires table and the `ModuleMainClass` attribute. Everything else in the
//! class file is skipped.

use crate::core::descriptor::{ModuleDescriptor, Requires, RequiresModifier};
use crate::core::errors::ModuleError;

const MAGIC: u32 = 0xCAFE_BABE;

const ACC_TRANSITIVE: u16 = 0x0020;
const ACC_STATIC_PHASE: u16 = 0x0040;
const ACC_SYNTHETIC: u16 = 0x1000;
const ACC_MANDATED: u16 = 0x8000;

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    Module(u16),
    Other,
    /// Second slot of a long or double.
    Unusable,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ModuleError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(malformed("truncated class file")),
        }
    }

    fn u1(&mut self) -> Result<u8, ModuleError> {
        Ok(self.take(1)?[0])
    }

    fn u2(&mut self) -> Result<u16, ModuleError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u4(&mut self) -> Result<u32, ModuleError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, n: usize) -> Result<(), ModuleError> {
        self.take(n).map(|_| ())
    }
}

fn malformed(reason: &str) -> ModuleError {
    ModuleError::MalformedDeclaration {
        path: None,
        reason: reason.to_string(),
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> Result<Self, ModuleError> {
        let count = reader.u2()? as usize;
        let mut entries = vec![Constant::Unusable];
        while entries.len() < count {
            let tag = reader.u1()?;
            match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    let text = String::from_utf8_lossy(reader.take(len)?).into_owned();
                    entries.push(Constant::Utf8(text));
                }
                7 => entries.push(Constant::Class(reader.u2()?)),
                19 => entries.push(Constant::Module(reader.u2()?)),
                8 | 16 | 20 => {
                    reader.skip(2)?;
                    entries.push(Constant::Other);
                }
                15 => {
                    reader.skip(3)?;
                    entries.push(Constant::Other);
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    entries.push(Constant::Other);
                }
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    entries.push(Constant::Unusable);
                }
                _ => return Err(malformed(&format!("unknown constant pool tag {}", tag))),
            }
        }
        Ok(ConstantPool(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str, ModuleError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(text)) => Ok(text),
            _ => Err(malformed("expected a UTF-8 constant")),
        }
    }

    fn module_name(&self, index: u16) -> Result<&str, ModuleError> {
        match self.0.get(index as usize) {
            Some(Constant::Module(name)) => self.utf8(*name),
            _ => Err(malformed("expected a module constant")),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ModuleError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => Ok(self.utf8(*name)?.replace('/', ".")),
            _ => Err(malformed("expected a class constant")),
        }
    }
}

/// Decode the module descriptor stored in `module-info.class` bytes.
pub fn read_module_info(bytes: &[u8]) -> Result<ModuleDescriptor, ModuleError> {
    let mut reader = Reader::new(bytes);
    if reader.u4()? != MAGIC {
        return Err(malformed("not a class file"));
    }
    reader.skip(4)?;
    let pool = ConstantPool::read(&mut reader)?;

    // access_flags, this_class, super_class
    reader.skip(6)?;
    let interfaces = reader.u2()? as usize;
    reader.skip(interfaces * 2)?;
    for _ in 0..2 {
        // fields, then methods
        let members = reader.u2()?;
        for _ in 0..members {
            reader.skip(6)?;
            skip_attributes(&mut reader)?;
        }
    }

    let mut descriptor = None;
    let mut main_class = None;
    let attributes = reader.u2()?;
    for _ in 0..attributes {
        let name = pool.utf8(reader.u2()?)?.to_string();
        let length = reader.u4()? as usize;
        let body = reader.take(length)?;
        match name.as_str() {
            "Module" => descriptor = Some(read_module_attribute(&mut Reader::new(body), &pool)?),
            "ModuleMainClass" => main_class = Some(pool.class_name(Reader::new(body).u2()?)?),
            _ => {}
        }
    }

    let descriptor = descriptor.ok_or_else(|| malformed("no Module attribute"))?;
    Ok(match main_class {
        Some(main_class) => descriptor.with_main_class(main_class),
        None => descriptor,
    })
}

fn skip_attributes(reader: &mut Reader<'_>) -> Result<(), ModuleError> {
    let count = reader.u2()?;
    for _ in 0..count {
        reader.skip(2)?;
        let length = reader.u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn read_module_attribute(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<ModuleDescriptor, ModuleError> {
    let name = pool.module_name(reader.u2()?)?;
    let _flags = reader.u2()?;
    let version_index = reader.u2()?;
    let mut descriptor = ModuleDescriptor::new(name);
    if version_index != 0 {
        descriptor = descriptor.with_version(pool.utf8(version_index)?);
    }
    let count = reader.u2()?;
    for _ in 0..count {
        let required = pool.module_name(reader.u2()?)?;
        let flags = reader.u2()?;
        let version_index = reader.u2()?;
        let mut requires = Requires::new(required);
        for (flag, modifier) in [
            (ACC_TRANSITIVE, RequiresModifier::Transitive),
            (ACC_STATIC_PHASE, RequiresModifier::Static),
            (ACC_SYNTHETIC, RequiresModifier::Synthetic),
            (ACC_MANDATED, RequiresModifier::Mandated),
        ] {
            if flags & flag != 0 {
                requires = requires.with_modifier(modifier);
            }
        }
        if version_index != 0 {
            requires = requires.with_version(pool.utf8(version_index)?);
        }
        descriptor = descriptor.with_requires(requires);
    }
    Ok(descriptor)
}

/// Encode a minimal `module-info.class` for fixtures.
#[cfg(test)]
pub(crate) fn encode_module_info(name: &str, requires: &[(&str, u16)]) -> Vec<u8> {
    fn utf8(pool: &mut Vec<u8>, text: &str) {
        pool.push(1);
        pool.extend_from_slice(&(text.len() as u16).to_be_bytes());
        pool.extend_from_slice(text.as_bytes());
    }

    // Constant pool layout: 1 "Module", then per module a Utf8 and a Module entry.
    let mut pool = Vec::new();
    utf8(&mut pool, "Module");
    let mut next = 2u16;
    let mut module_index = |pool: &mut Vec<u8>, module: &str| {
        utf8(pool, module);
        pool.push(19);
        pool.extend_from_slice(&next.to_be_bytes());
        let index = next + 1;
        next += 2;
        index
    };
    let this = module_index(&mut pool, name);
    let edges: Vec<(u16, u16)> = requires
        .iter()
        .map(|(module, flags)| (module_index(&mut pool, module), *flags))
        .collect();
    let count = next;

    let mut attribute = Vec::new();
    attribute.extend_from_slice(&this.to_be_bytes());
    attribute.extend_from_slice(&0u16.to_be_bytes());
    attribute.extend_from_slice(&0u16.to_be_bytes());
    attribute.extend_from_slice(&(edges.len() as u16).to_be_bytes());
    for (index, flags) in edges {
        attribute.extend_from_slice(&index.to_be_bytes());
        attribute.extend_from_slice(&flags.to_be_bytes());
        attribute.extend_from_slice(&0u16.to_be_bytes());
    }
    // exports, opens, uses, provides
    attribute.extend_from_slice(&[0; 8]);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MAGIC.to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 53]);
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes.extend_from_slice(&pool);
    bytes.extend_from_slice(&0x8000u16.to_be_bytes());
    bytes.extend_from_slice(&[0; 10]);
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&(attribute.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&attribute);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_requires_with_flags() {
        let bytes = encode_module_info(
            "org.junit.jupiter.api",
            &[
                ("java.base", ACC_MANDATED),
                ("org.opentest4j", ACC_TRANSITIVE),
                ("org.apiguardian.api", ACC_TRANSITIVE | ACC_STATIC_PHASE),
            ],
        );
        let descriptor = read_module_info(&bytes).unwrap();
        assert_eq!(descriptor.name(), "org.junit.jupiter.api");
        let required: Vec<&str> = descriptor.required_names().collect();
        assert_eq!(required, vec!["org.opentest4j"]);
        assert_eq!(descriptor.requires().count(), 3);
    }

    #[test]
    fn test_rejects_non_class_file() {
        assert!(read_module_info(b"PK\x03\x04").is_err());
        assert!(read_module_info(&[0xCA, 0xFE]).is_err());
    }
}
