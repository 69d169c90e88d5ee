mod methods;
mod params;
mod supervisor;
