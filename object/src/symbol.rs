use std::fmt;
use std::sync::{Arc, LazyLock};

use ahash::AHashMap;
use parking_lot::RwLock;

/// An interned name. Two symbols are equal iff their names are equal, so
/// method and variable names compare by identity rather than content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

struct SymbolTableImpl {
    names: Vec<Arc<str>>,
    ids: AHashMap<Arc<str>, Symbol>,
}

/// Process-wide interning arena. Symbols are never released.
pub struct SymbolTable(RwLock<SymbolTableImpl>);

static SYMBOLS: LazyLock<SymbolTable> = LazyLock::new(SymbolTable::new);

impl SymbolTableImpl {
    fn get_or_add(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.ids.get(name) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        let interned: Arc<str> = Arc::from(name);
        self.names.push(interned.clone());
        self.ids.insert(interned, sym);
        sym
    }
}

impl SymbolTable {
    fn new() -> Self {
        Self(RwLock::new(SymbolTableImpl {
            names: Vec::new(),
            ids: AHashMap::new(),
        }))
    }

    pub fn global() -> &'static SymbolTable {
        &SYMBOLS
    }

    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(&sym) = self.0.read().ids.get(name) {
            return sym;
        }
        self.0.write().get_or_add(name)
    }

    pub fn name(&self, sym: Symbol) -> Arc<str> {
        // Symbols are only minted by this table, so the index is in range.
        self.0.read().names[sym.0 as usize].clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Symbol {
    pub fn intern(name: &str) -> Symbol {
        SYMBOLS.intern(name)
    }

    pub fn name(self) -> Arc<str> {
        SYMBOLS.name(self)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name())
    }
}
