use course_access::access::{Course, Group, Role, User};

/// Builder for creating test users
pub struct UserBuilder {
    id: String,
    full_name: String,
    role: Role,
    is_active: bool,
}

impl UserBuilder {
    pub fn new(id: &str) -> Self {
        let mut full_name = id.to_string();
        if let Some(first) = full_name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            id: id.to_string(),
            full_name,
            role: Role::Student,
            is_active: true,
        }
    }

    pub fn named(mut self, full_name: &str) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    pub fn admin(mut self) -> Self {
        self.role = Role::Admin;
        self
    }

    pub fn teacher(mut self) -> Self {
        self.role = Role::Teacher;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> User {
        let email = format!("{}@school.test", self.id);
        User {
            id: self.id,
            full_name: self.full_name,
            email,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

/// Builder for creating test groups
pub struct GroupBuilder {
    id: String,
    name: String,
    is_active: bool,
}

impl GroupBuilder {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> Group {
        Group {
            id: self.id,
            name: self.name,
            is_active: self.is_active,
        }
    }
}

pub fn course(id: &str, title: &str) -> Course {
    Course {
        id: id.to_string(),
        title: title.to_string(),
        is_published: true,
    }
}
