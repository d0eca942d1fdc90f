//! Static entity table for the retail back office.

use std::collections::BTreeMap;

use crate::{
    domain::{EntityDescriptor, EntityLabels, FieldSpec, ForeignKeyRef, IdSource},
    error::RegistryError,
};

const PHONE_PATTERN: &str = r"\d{8}";

pub static PRODUCTOS: EntityDescriptor = EntityDescriptor {
    name: "productos",
    resource_path: "productos",
    id_field: "codProducto",
    id_source: IdSource::UserSupplied(FieldSpec::text("codProducto", "Código")),
    labels: EntityLabels {
        singular: "producto",
        plural: "productos",
        title: "producto",
        id_header: "Código",
    },
    fields: &[
        FieldSpec::text("producto", "Nombre").column("Nombre"),
        FieldSpec::text("descripcion", "Descripción").column("Descripción"),
        FieldSpec::decimal("precio", "Precio")
            .min(0.01)
            .column("Precio")
            .currency(),
        FieldSpec::decimal("costo", "Costo").min(1.0),
        FieldSpec::number("existencias", "Existencias").min(0.0),
        FieldSpec::number("categoriaId", "ID de categoría").min(1.0),
        FieldSpec::text("imagenUrl", "URL de imagen (opcional)").optional(),
        FieldSpec::number("existenciaMax", "Existencia máxima")
            .optional()
            .min(0.0)
            .default_value("0"),
        FieldSpec::number("existenciaMin", "Existencia mínima")
            .optional()
            .min(0.0)
            .default_value("0"),
    ],
    references: &[],
    delete_prompt: "¿Eliminar {producto}?",
};

pub static CLIENTES: EntityDescriptor = EntityDescriptor {
    name: "clientes",
    resource_path: "clientes",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "cliente",
        plural: "clientes",
        title: "Cliente",
        id_header: "ID",
    },
    fields: &[
        FieldSpec::text("nombres", "Nombres").column("Nombres"),
        FieldSpec::text("apellidos", "Apellidos").column("Apellidos"),
        FieldSpec::text("telefono", "Teléfono (8 dígitos)")
            .pattern(PHONE_PATTERN)
            .column("Teléfono"),
        FieldSpec::reference("usuarioId", "Usuario").column("Usuario"),
    ],
    references: &[ForeignKeyRef::new("usuarioId", "usuarios", "id", "email")],
    delete_prompt: "¿Eliminar cliente {nombres} {apellidos}?",
};

pub static USUARIOS: EntityDescriptor = EntityDescriptor {
    name: "usuarios",
    resource_path: "usuarios",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "usuario",
        plural: "usuarios",
        title: "usuario",
        id_header: "ID",
    },
    fields: &[
        FieldSpec::email("email", "Email").column("Email"),
        FieldSpec::password("password", "Contraseña").required_on_create(),
        FieldSpec::number("rolId", "Rol ID").min(1.0).column("Rol"),
    ],
    references: &[],
    delete_prompt: "¿Eliminar usuario {email}?",
};

pub static PROVEEDORES: EntityDescriptor = EntityDescriptor {
    name: "proveedores",
    resource_path: "proveedores",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "proveedor",
        plural: "proveedores",
        title: "Proveedor",
        id_header: "ID",
    },
    fields: &[
        FieldSpec::text("nombre", "Nombre").column("Nombre"),
        FieldSpec::text("telefono", "Teléfono (8 dígitos)")
            .pattern(PHONE_PATTERN)
            .column("Teléfono"),
        FieldSpec::email("email", "Email").column("Email"),
    ],
    references: &[],
    delete_prompt: "¿Eliminar proveedor {nombre}?",
};

pub static DEPARTAMENTOS: EntityDescriptor = EntityDescriptor {
    name: "departamentos",
    resource_path: "departamentos",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "departamento",
        plural: "departamentos",
        title: "Departamento",
        id_header: "ID",
    },
    fields: &[FieldSpec::text("departamento", "Departamento").column("Departamento")],
    references: &[],
    delete_prompt: "¿Eliminar departamento \"{departamento}\"?",
};

pub static MUNICIPIOS: EntityDescriptor = EntityDescriptor {
    name: "municipios",
    resource_path: "municipio",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "municipio",
        plural: "municipios",
        title: "Municipio",
        id_header: "ID",
    },
    fields: &[
        FieldSpec::text("municipio", "Municipio").column("Municipio"),
        FieldSpec::reference("departamentoId", "Departamento").column("Departamento"),
    ],
    references: &[ForeignKeyRef::new(
        "departamentoId",
        "departamentos",
        "id",
        "departamento",
    )],
    delete_prompt: "¿Eliminar municipio \"{municipio}\"?",
};

pub static TIPOS_AJUSTE: EntityDescriptor = EntityDescriptor {
    name: "tipoajustes",
    resource_path: "tipoajustes",
    id_field: "id",
    id_source: IdSource::Server,
    labels: EntityLabels {
        singular: "tipo de ajuste",
        plural: "tipos de ajuste",
        title: "Tipo de Ajuste",
        id_header: "ID",
    },
    fields: &[FieldSpec::text("tipoAjuste", "Tipo de Ajuste").column("Tipo de Ajuste")],
    references: &[],
    delete_prompt: "¿Eliminar tipo de ajuste \"{tipoAjuste}\"?",
};

pub static STANDARD_ENTITIES: [&EntityDescriptor; 7] = [
    &PRODUCTOS,
    &CLIENTES,
    &USUARIOS,
    &PROVEEDORES,
    &DEPARTAMENTOS,
    &MUNICIPIOS,
    &TIPOS_AJUSTE,
];

/// Entity descriptors keyed by entity name.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: BTreeMap<&'static str, &'static EntityDescriptor>,
}

impl EntityRegistry {
    pub fn builder() -> EntityRegistryBuilder {
        EntityRegistryBuilder::default()
    }

    /// Every entity managed by the back office.
    pub fn standard() -> Self {
        Self {
            entities: STANDARD_ENTITIES
                .iter()
                .map(|descriptor| (descriptor.name, *descriptor))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static EntityDescriptor> {
        self.entities.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static EntityDescriptor> + '_ {
        self.entities.values().copied()
    }

    pub fn target_of(&self, reference: &ForeignKeyRef) -> Option<&'static EntityDescriptor> {
        self.get(reference.target_entity)
    }
}

#[derive(Debug, Default)]
pub struct EntityRegistryBuilder {
    descriptors: Vec<&'static EntityDescriptor>,
}

impl EntityRegistryBuilder {
    pub fn register(mut self, descriptor: &'static EntityDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> Result<EntityRegistry, RegistryError> {
        let mut entities = BTreeMap::new();
        for descriptor in &self.descriptors {
            if entities.insert(descriptor.name, *descriptor).is_some() {
                return Err(RegistryError::DuplicateEntity(descriptor.name.to_string()));
            }
        }

        for descriptor in entities.values() {
            for reference in descriptor.references {
                if !entities.contains_key(reference.target_entity) {
                    return Err(RegistryError::DanglingReference {
                        entity: descriptor.name.to_string(),
                        field: reference.local_field.to_string(),
                        target: reference.target_entity.to_string(),
                    });
                }
            }
        }

        Ok(EntityRegistry { entities })
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
