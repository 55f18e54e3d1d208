//! Undoable diagram edits.
//!
//! Every [`Command`] captures what it needs to compensate for itself while
//! executing, and flushes the diagram after each mutation so the layout is
//! settled between commands. [`CommandStack`] keeps the undo and redo
//! history and restores a snapshot of the diagram whenever a step fails
//! halfway.

use std::fmt;

use log::{debug, warn};

use swimlane_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{
    diagram::Diagram,
    docker::DockerId,
    error::{LayoutError, Result},
};

/// An edit that can be rolled back.
pub trait Command: fmt::Debug {
    /// Applies the edit, recording what [`Command::rollback`] needs.
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()>;

    /// Reverts a previous [`Command::execute`].
    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()>;
}

/// Moves a shape by an offset.
#[derive(Debug, Clone)]
pub struct MoveShape {
    shape: Id,
    offset: Point,
}

impl MoveShape {
    pub fn new(shape: Id, offset: Point) -> Self {
        Self { shape, offset }
    }
}

impl Command for MoveShape {
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()> {
        diagram.move_shape_by(self.shape, self.offset)?;
        diagram.flush();
        Ok(())
    }

    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()> {
        diagram.move_shape_by(self.shape, self.offset.scale(-1.0))?;
        diagram.flush();
        Ok(())
    }
}

/// Gives a node new bounds.
#[derive(Debug, Clone)]
pub struct ResizeShape {
    shape: Id,
    bounds: Bounds,
    previous: Option<Bounds>,
}

impl ResizeShape {
    pub fn new(shape: Id, bounds: Bounds) -> Self {
        Self {
            shape,
            bounds,
            previous: None,
        }
    }
}

impl Command for ResizeShape {
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()> {
        let previous = diagram
            .bounds_of(self.shape)
            .ok_or(LayoutError::UnknownShape(self.shape))?;
        diagram.resize_shape(self.shape, self.bounds)?;
        self.previous = Some(previous);
        diagram.flush();
        Ok(())
    }

    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()> {
        let Some(previous) = self.previous else {
            return Ok(());
        };
        diagram.resize_shape(self.shape, previous)?;
        diagram.flush();
        Ok(())
    }
}

/// Splits an edge segment with a new docker.
#[derive(Debug, Clone)]
pub struct AddDocker {
    edge: Id,
    point: Point,
    added: Option<DockerId>,
}

impl AddDocker {
    pub fn new(edge: Id, point: Point) -> Self {
        Self {
            edge,
            point,
            added: None,
        }
    }

    /// The docker created by the last execution.
    pub fn added(&self) -> Option<DockerId> {
        self.added
    }
}

impl Command for AddDocker {
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()> {
        self.added = Some(diagram.add_docker(self.edge, self.point)?);
        diagram.flush();
        Ok(())
    }

    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()> {
        let Some(added) = self.added.take() else {
            return Ok(());
        };
        diagram.remove_docker(self.edge, added)?;
        diagram.flush();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct RemovedDocker {
    index: usize,
    center: Point,
    docked_shape: Option<Id>,
    reference: Option<Point>,
}

/// Removes a docker from an edge.
#[derive(Debug, Clone)]
pub struct RemoveDocker {
    edge: Id,
    docker: DockerId,
    removed: Option<RemovedDocker>,
}

impl RemoveDocker {
    pub fn new(edge: Id, docker: DockerId) -> Self {
        Self {
            edge,
            docker,
            removed: None,
        }
    }

    /// The docker this command removes. Changes after a rollback, which
    /// recreates the docker under a fresh id.
    pub fn docker(&self) -> DockerId {
        self.docker
    }
}

impl Command for RemoveDocker {
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()> {
        let index = diagram
            .edge(self.edge)
            .ok_or(LayoutError::UnknownShape(self.edge))?
            .docker_index(self.docker)
            .ok_or(LayoutError::UnknownDocker {
                edge: self.edge,
                docker: self.docker,
            })?;
        let docker = diagram.remove_docker(self.edge, self.docker)?;
        self.removed = Some(RemovedDocker {
            index,
            center: docker.center(),
            docked_shape: docker.docked_shape(),
            reference: docker.reference_point(),
        });
        diagram.flush();
        Ok(())
    }

    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()> {
        let Some(removed) = self.removed.take() else {
            return Ok(());
        };
        let id = diagram.restore_docker(self.edge, removed.index, removed.center)?;
        if let Some(reference) = removed.reference {
            diagram.set_reference_point(self.edge, id, reference)?;
        }
        if removed.docked_shape.is_some() {
            diagram.dock(self.edge, id, removed.docked_shape)?;
        }
        debug!(edge_id:% = self.edge, docker:% = id, index = removed.index; "Restored docker");
        self.docker = id;
        diagram.flush();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct DockState {
    shape: Option<Id>,
    reference: Option<Point>,
    center: Point,
}

/// Docks a docker to a shape, or undocks it.
#[derive(Debug, Clone)]
pub struct DockDocker {
    edge: Id,
    docker: DockerId,
    target: Option<Id>,
    previous: Option<DockState>,
}

impl DockDocker {
    pub fn new(edge: Id, docker: DockerId, target: Option<Id>) -> Self {
        Self {
            edge,
            docker,
            target,
            previous: None,
        }
    }
}

impl Command for DockDocker {
    fn execute(&mut self, diagram: &mut Diagram) -> Result<()> {
        let docker = diagram
            .edge(self.edge)
            .ok_or(LayoutError::UnknownShape(self.edge))?
            .docker(self.docker)
            .ok_or(LayoutError::UnknownDocker {
                edge: self.edge,
                docker: self.docker,
            })?;
        let previous = DockState {
            shape: docker.docked_shape(),
            reference: docker.reference_point(),
            center: docker.center(),
        };
        diagram.dock(self.edge, self.docker, self.target)?;
        self.previous = Some(previous);
        diagram.flush();
        Ok(())
    }

    fn rollback(&mut self, diagram: &mut Diagram) -> Result<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        if let Some(reference) = previous.reference {
            diagram.set_reference_point(self.edge, self.docker, reference)?;
        }
        diagram.dock(self.edge, self.docker, previous.shape)?;
        if previous.shape.is_none() {
            diagram.move_docker(self.edge, self.docker, previous.center)?;
        }
        diagram.flush();
        Ok(())
    }
}

/// Undo and redo history.
#[derive(Debug, Default)]
pub struct CommandStack {
    done: Vec<Box<dyn Command>>,
    undone: Vec<Box<dyn Command>>,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Executes `command` and records it for undo. Clears the redo history.
    ///
    /// # Errors
    ///
    /// Returns the command's error, after restoring the diagram to its state
    /// before the command.
    pub fn execute(&mut self, diagram: &mut Diagram, mut command: Box<dyn Command>) -> Result<()> {
        let snapshot = diagram.clone();
        if let Err(err) = command.execute(diagram) {
            warn!(command:? = command, err:% = err; "Command failed, diagram restored");
            *diagram = snapshot;
            return Err(err);
        }
        self.done.push(command);
        self.undone.clear();
        Ok(())
    }

    /// Rolls back the most recent command. Returns `false` if there is
    /// nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the rollback error, after restoring the diagram. The command
    /// stays on the undo history.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Result<bool> {
        let Some(mut command) = self.done.pop() else {
            return Ok(false);
        };
        let snapshot = diagram.clone();
        match command.rollback(diagram) {
            Ok(()) => {
                self.undone.push(command);
                Ok(true)
            }
            Err(err) => {
                warn!(command:? = command, err:% = err; "Undo failed, diagram restored");
                *diagram = snapshot;
                self.done.push(command);
                Err(err)
            }
        }
    }

    /// Executes the most recently undone command again. Returns `false` if
    /// there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns the command's error, after restoring the diagram. The command
    /// stays on the redo history.
    pub fn redo(&mut self, diagram: &mut Diagram) -> Result<bool> {
        let Some(mut command) = self.undone.pop() else {
            return Ok(false);
        };
        let snapshot = diagram.clone();
        match command.execute(diagram) {
            Ok(()) => {
                self.done.push(command);
                Ok(true)
            }
            Err(err) => {
                warn!(command:? = command, err:% = err; "Redo failed, diagram restored");
                *diagram = snapshot;
                self.undone.push(command);
                Err(err)
            }
        }
    }
}
